/*! The bit-vector engine (components A-D): a shared read-only trait over
two concrete representations — an immutable, cheaply cloneable view
([`Bits`]) and an exclusively-owned, in-place-mutable builder
([`MutableBits`]) — plus the free-function bit algorithms both share.

Bit zero is always the most significant bit of the first storage byte
(MSB0). There is no generic bit-order or storage-element parameter
here: the bit order is fixed, so that indirection buys nothing and is
dropped.
!*/

pub mod builder;
pub mod index;
pub mod iter;
pub mod parse;
pub mod raw;
pub mod read;
pub mod view;

pub use builder::MutableBits;
pub use index::BitIdx;
pub use iter::{Chunks, FindAll};
pub use parse::parse_bit_source;
pub use read::BitRead;
pub use view::Bits;
