/// Router Module Index
///
/// The gateway answers only a handful of paths itself; everything else the route
/// guard allows falls through to the upstream (see `create_router`).

/// Routes answered by the gateway, reachable regardless of session.
pub mod public;
