use crate::{matrix::Orientation, register::BitFlags};

/// Maximum number of modules in a chain supported by this driver.
pub const MAX_CHAIN_LENGTH: usize = 32;

/// Layout of the chain: how many modules and how their cells are mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Topology {
    pub(crate) module_count: usize,
    pub(crate) orientation: Orientation,
    pub(crate) reversed: bool,
}

impl Topology {
    pub fn module_count(&self) -> usize {
        self.module_count
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn reversed(&self) -> bool {
        self.reversed
    }

    /// Chain index of the module showing visible band `band` (0 = leftmost band).
    ///
    /// Chain index 0 is the module farthest from the controller, so without
    /// reversal the leftmost band goes to the last module.
    pub fn physical_index(&self, band: usize) -> usize {
        if self.reversed {
            band
        } else {
            self.module_count - 1 - band
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Configuration {
    pub(crate) module_count: usize,
    pub(crate) orientation: Orientation,
    pub(crate) reversed: bool,
    pub(crate) intensity: u8,
    pub(crate) scan_limit: u8,
}

impl Configuration {
    pub fn topology(&self) -> Topology {
        Topology {
            module_count: self.module_count,
            orientation: self.orientation,
            reversed: self.reversed,
        }
    }

    pub fn intensity_reg_value(&self) -> u8 {
        self.intensity.min(BitFlags::INTENSITY_MAX)
    }

    pub fn scan_limit_reg_value(&self) -> u8 {
        self.scan_limit.min(BitFlags::SCAN_LIMIT_ALL_DIGITS)
    }
}

/// Builder for creating the chain configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    pub(crate) configuration: Configuration,
}

macro_rules! builder_property {
    ($field:ident, $field_type:path, $doc:literal) => {
        #[doc = $doc]
        pub fn $field(mut self, $field: $field_type) -> Self {
            self.configuration.$field = $field;
            self
        }
    };
}

impl ConfigBuilder {
    /// Create a new configuration for a chain of `module_count` modules.
    pub fn new(module_count: usize) -> Self {
        Self {
            configuration: Configuration {
                module_count,
                orientation: Orientation::None,
                reversed: false,
                intensity: BitFlags::INTENSITY_MAX,
                scan_limit: BitFlags::SCAN_LIMIT_ALL_DIGITS,
            },
        }
    }

    builder_property!(
        orientation,
        Orientation,
        "Rotation applied to every pattern before it is sent"
    );
    builder_property!(
        reversed,
        bool,
        "Send the leftmost band to chain index 0 instead of the last module"
    );
    builder_property!(
        intensity,
        u8,
        "Initial brightness (0..15), larger values are clamped"
    );
    builder_property!(
        scan_limit,
        u8,
        "Number of scanned digits minus one (0..7), larger values are clamped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let builder = ConfigBuilder::new(3)
            .orientation(Orientation::Rotate180)
            .intensity(40)
            .scan_limit(3);

        assert_eq!(builder.configuration.module_count, 3);
        assert_eq!(builder.configuration.orientation, Orientation::Rotate180);
        assert!(!builder.configuration.reversed);
        assert_eq!(builder.configuration.intensity_reg_value(), 15);
        assert_eq!(builder.configuration.scan_limit_reg_value(), 3);
    }

    #[test]
    fn test_physical_index() {
        let mut topology = ConfigBuilder::new(4).configuration.topology();
        assert_eq!(
            (0..4).map(|band| topology.physical_index(band)).collect::<Vec<_>>(),
            vec![3, 2, 1, 0]
        );

        topology.reversed = true;
        assert_eq!(
            (0..4).map(|band| topology.physical_index(band)).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }
}
