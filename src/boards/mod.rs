//! Board descriptors
//!
//! Each board module is pure `const` data: the register id layout, the
//! register map, and the attribute table built from the descriptors in this
//! crate. Pair a module's [`AddressLayout`](crate::AddressLayout) with one
//! transport per chip to get a working [`ChipRegistry`](crate::ChipRegistry):
//!
//! ```ignore
//! use switch_cpld::boards::as5712_54x as board;
//! use switch_cpld::{ChipRegistry, I2cInterface};
//!
//! let chips = board::I2C_ADDRESSES.map(|addr| I2cInterface::new(bus.acquire(), addr));
//! let mut regs = ChipRegistry::new(board::LAYOUT, chips);
//!
//! let mut text = heapless::String::<32>::new();
//! board::ATTRIBUTES.show("psu_pwr1_all_ok", &mut regs, &mut text)?;
//! ```

pub mod as5712_54x;
pub mod as7412_32x;
