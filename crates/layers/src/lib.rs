pub mod classify;
pub mod extrusion;
pub mod layer;
pub mod policy;
pub mod style;
pub mod symbology;

pub use classify::*;
pub use layer::*;
pub use policy::*;
pub use style::*;
pub use symbology::*;
