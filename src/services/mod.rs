pub mod social;
pub mod titulos;
