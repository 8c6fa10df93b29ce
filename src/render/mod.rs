pub(crate) mod compositor;
pub(crate) mod cpu;
pub(crate) mod encode;
pub(crate) mod scheduler;
pub(crate) mod surface;
