pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod compositor;
pub(crate) mod layer;
pub(crate) mod raster;
pub(crate) mod underline;
