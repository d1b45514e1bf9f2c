//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements       | Connects to                 |
//! |-----------------|------------------|-----------------------------|
//! | `log_sink`      | EventSink        | `log` facade                |
//! |                 | PrintActionSink  | `log` facade (no printer)   |
//! | `settings_file` | SettingsPort     | JSON file on disk           |
//! | `sim_gpio`      | GpioPort         | In-memory pin bank          |

pub mod log_sink;
pub mod settings_file;
pub mod sim_gpio;
