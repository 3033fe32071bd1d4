use super::*;

mod io_render;
mod session;

pub(in crate::cli) use io_render::*;
pub(in crate::cli) use session::*;
