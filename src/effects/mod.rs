pub mod fx;
pub mod transitions;
