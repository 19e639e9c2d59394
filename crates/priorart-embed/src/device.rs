use candle_core::Device;

/// Metal when built with the `metal` feature and a GPU answers, CPU otherwise.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                tracing::info!(device = "metal", "candle device selected");
                return dev;
            }
            Err(e) => tracing::warn!(error = %e, "metal device unavailable, using cpu"),
        }
    }
    tracing::info!(device = "cpu", "candle device selected");
    Device::Cpu
}
