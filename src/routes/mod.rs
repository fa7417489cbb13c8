/// Router Module Index
///
/// Splits the route table by who may call it. Access control is attached
/// per module: a middleware layer for authenticated routes, the `AdminUser`
/// extractor inside admin handlers.

/// Routes accessible to anyone: catalog and blog reads, register/login/logout.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
pub mod authenticated;

/// Mutations gated on the session principal's admin flag.
pub mod admin;
