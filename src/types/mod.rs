mod option;

pub use option::*;
