//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements            | Connects to              |
//! |------------|-----------------------|--------------------------|
//! | `serial`   | Connector, LineSource | Controller UART (`serialport`) |
//! | `log_sink` | EventSink             | `log` facade             |

pub mod log_sink;
pub mod serial;
