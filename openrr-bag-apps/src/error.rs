use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("openrr-bag-apps: Failed to parse {:?} as toml ({}).", .0, .1)]
    TomlParseFailure(PathBuf, #[source] toml::de::Error),
    #[error("openrr-bag-apps: No File {:?} is found ({}).", .0, .1)]
    NoFile(PathBuf, #[source] std::io::Error),
    #[error("openrr-bag-apps: openrr-bag: {}", .0)]
    OpenrrBag(#[from] openrr_bag::Error),
    #[error("openrr-bag-apps: openrr-bag-gui: {}", .0)]
    OpenrrBagGui(#[from] openrr_bag_gui::Error),
}
