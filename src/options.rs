use crate::dialect::Dialect;

/// The default CHIP-8 processor speed in hertz.
const DEFAULT_PROCESSOR_SPEED_HERTZ: u64 = 720;
/// The default CHIP-8 program start address within memory.
const DEFAULT_PROGRAM_ADDRESS: u16 = 0x200;
/// The approximate COSMAC VIP instruction rate, used for historically-accurate variable
/// cycle timing.
pub const COSMAC_VIP_PROCESSOR_SPEED_HERTZ: u64 = 1_760_900;

/// A struct to allow specification of Chipolata start-up parameters.
///
/// Chipolata provides many configurable options, for example the (initial) processor speed
/// and which [Dialect] of the CHIP-8 family should be emulated. Configuration of these options
/// is done through the [Options] struct, an instance of which is passed to
/// [Processor::initialise_and_load()](crate::processor::Processor::initialise_and_load) when
/// instantiating [Processor](crate::processor::Processor).
#[derive(Copy, Clone, Debug)]
pub struct Options {
    pub processor_speed_hertz: u64,
    pub program_start_address: u16,
    pub dialect: Dialect,
}

impl Options {
    /// Constructor that returns an [Options] instance using the supplied processor speed and
    /// dialect, and default values for all other fields.
    pub fn new(processor_speed_hertz: u64, dialect: Dialect) -> Self {
        Options {
            processor_speed_hertz,
            dialect,
            ..Options::default()
        }
    }
}

impl Default for Options {
    /// Constructor that returns an [Options] instance using typical default settings.
    fn default() -> Self {
        Options {
            processor_speed_hertz: DEFAULT_PROCESSOR_SPEED_HERTZ,
            program_start_address: DEFAULT_PROGRAM_ADDRESS,
            dialect: Dialect::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.processor_speed_hertz, DEFAULT_PROCESSOR_SPEED_HERTZ);
        assert_eq!(options.program_start_address, DEFAULT_PROGRAM_ADDRESS);
        assert_eq!(options.dialect, Dialect::default());
    }

    #[test]
    fn test_new_overrides_speed_and_dialect() {
        let options = Options::new(2000, Dialect::XoChip);
        assert_eq!(options.processor_speed_hertz, 2000);
        assert_eq!(options.dialect, Dialect::XoChip);
        assert_eq!(options.program_start_address, DEFAULT_PROGRAM_ADDRESS);
    }
}
