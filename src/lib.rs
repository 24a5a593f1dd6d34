#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use gr_serial as serial;
pub use gr_utils as utils;
