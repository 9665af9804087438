/// Template catalog and descriptors.
pub mod catalog;
/// Frame sources over animated and still images.
pub mod decode;
/// Asset addressing and transports.
pub mod transport;
