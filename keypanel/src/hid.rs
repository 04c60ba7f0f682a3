//! Traits and types for HID reporting to the host.
use core::future::Future;

use embassy_usb::driver::EndpointError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    UsbEndpointError(EndpointError),
    /// The usb device isn't enabled by the host
    UsbDisabled,
}

impl HidError {
    /// Whether the HID device is gone. A fatal error stops the panel, the board has to be
    /// reset or reconnected.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HidError::UsbDisabled | HidError::UsbEndpointError(EndpointError::Disabled)
        )
    }
}

impl From<EndpointError> for HidError {
    fn from(e: EndpointError) -> Self {
        HidError::UsbEndpointError(e)
    }
}

/// HidWriterTrait is used for reporting HID messages to the host.
pub trait HidWriterTrait {
    /// The report type that the writer sends.
    type ReportType;

    /// Write report to the host, return the number of bytes written if success.
    fn write_report(&mut self, report: Self::ReportType) -> impl Future<Output = Result<usize, HidError>>;
}
