mod product;

pub use product::{NewProduct, Product, ProductChanges, ProductTotals};
