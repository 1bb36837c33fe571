pub mod route_guard;
