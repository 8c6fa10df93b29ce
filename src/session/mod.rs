pub(crate) mod editor;
pub(crate) mod history;
pub(crate) mod persist;
pub(crate) mod share;
pub(crate) mod state;
