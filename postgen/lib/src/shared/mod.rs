mod descriptor;

pub use descriptor::*;
