// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Environment variable consulted by the CLI when `--fault` is not given.
pub const FAULT_ENV: &str = "BUFFER_CLASSIFIER_FAULT";

/// How the intentional crash is delivered.
#[derive(
    Clone, Copy, Debug, Default, Display, EnumIter, EnumString, Eq, IntoStaticStr, PartialEq,
)]
#[strum(serialize_all = "kebab-case")]
pub enum FaultMode {
    /// `std::process::abort()`, observed as `SIGABRT` on unix.
    #[default]
    Abort,

    /// Volatile write through a null pointer.
    ///
    /// Usually observed as `SIGSEGV`. Builds with debug pointer checks turn
    /// this into an abort before the write happens.
    NullWrite,
}

impl FaultMode {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn trigger(self) -> ! {
        match self {
            FaultMode::Abort => std::process::abort(),
            FaultMode::NullWrite => {
                let ptr: *mut u8 = std::ptr::null_mut();
                unsafe {
                    ptr.write_volatile(1);
                }

                // Only reached if the write was somehow survivable.
                std::process::abort()
            }
        }
    }
}
