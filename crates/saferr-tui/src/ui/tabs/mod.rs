//! Page renderers. Each is only called once the route guard has let the
//! current session through.

pub mod brand;
pub mod codes;
pub mod dashboard;
pub mod products;
pub mod suspicious;
pub mod trends;
