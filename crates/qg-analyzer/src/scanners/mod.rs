mod component;
mod consistency;
mod duplicate;
mod long_function;
mod type_safety;
mod unused_imports;

pub use component::ComponentScanner;
pub use consistency::ConsistencyScanner;
pub use duplicate::DuplicateScanner;
pub use long_function::LongFunctionScanner;
pub use type_safety::TypeSafetyScanner;
pub use unused_imports::UnusedImportScanner;
