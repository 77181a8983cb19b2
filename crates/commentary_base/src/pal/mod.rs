/* 📖 # What is the Platform Abstraction Layer?

The PAL puts filesystem access and the HTTP server behind the `Pal` trait.
`RealPal` talks to the operating system, `MockPal` keeps files in memory and
dispatches HTTP requests directly to the registered service.
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle};
