pub(crate) mod format;
pub(crate) mod layers;
pub(crate) mod scene;
