pub mod io;
pub mod mask;
pub mod synthetic;
pub mod unit_vector;

pub use self::mask::InstanceMask;
pub use self::unit_vector::UnitVectorField;
