// Domain layer - Core types of a trim, free of any container library

pub mod model;
