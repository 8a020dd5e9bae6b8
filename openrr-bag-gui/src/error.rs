use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("openrr-bag-gui: eframe: {}", .0)]
    Eframe(String),
}
