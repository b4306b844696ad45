//! The structured system descriptor a client can volunteer as a message
//! payload.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use sysinfo::{Disks, MacAddr, Networks, System};

bitflags! {
    /// Which parts of the system a report should describe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IncludedInfo: u8 {
        /// The machine's host name.
        const HOSTNAME = 1;
        /// Operating system name and version.
        const PLATFORM = 1 << 1;
        /// Processor model, thread count and frequency.
        const CPU = 1 << 2;
        /// Total/used/free memory.
        const MEMORY = 1 << 3;
        /// Total/used/free space of the first disk.
        const DISK = 1 << 4;
        /// MAC address of the first active network interface.
        const MAC_ADDR = 1 << 5;
    }
}

/// Processor details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuReport {
    /// Logical processor count.
    pub threads: usize,
    /// Frequency in MHz.
    pub frequency_mhz: u64,
    /// Processor brand string.
    pub name: String,
}

/// Memory details, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryReport {
    /// Total installed memory.
    pub total: u64,
    /// Memory in use.
    pub used: u64,
    /// Memory free.
    pub free: u64,
}

/// Disk details, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskReport {
    /// Mount point of the reported disk.
    pub path: String,
    /// Total capacity.
    pub total: u64,
    /// Space in use.
    pub used: u64,
    /// Space available.
    pub free: u64,
}

/// A system descriptor, serialized as JSON when sent as a message body.
///
/// Fields excluded by the [`IncludedInfo`] mask stay `None` and are omitted
/// from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    /// Host name, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// OS name/version, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Processor details, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuReport>,

    /// Memory details, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryReport>,

    /// Disk details, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<DiskReport>,

    /// MAC address, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_addr: Option<String>,
}

impl SystemReport {
    /// Probes the running system for the details selected by `included`.
    ///
    /// Details the platform cannot provide stay `None`.
    pub fn probe(included: IncludedInfo) -> Self {
        let mut report = Self::default();
        if included.is_empty() {
            return report;
        }

        if included.contains(IncludedInfo::HOSTNAME) {
            report.hostname = System::host_name();
        }

        if included.contains(IncludedInfo::PLATFORM) {
            report.platform = System::long_os_version().or_else(System::name);
        }

        if included.intersects(IncludedInfo::CPU | IncludedInfo::MEMORY) {
            let mut system = System::new_all();
            system.refresh_all();

            if included.contains(IncludedInfo::CPU) {
                if let Some(cpu) = system.cpus().first() {
                    report.cpu = Some(CpuReport {
                        threads: system.cpus().len(),
                        frequency_mhz: cpu.frequency(),
                        name: cpu.brand().trim().to_owned(),
                    });
                }
            }

            if included.contains(IncludedInfo::MEMORY) {
                report.memory = Some(MemoryReport {
                    total: system.total_memory(),
                    used: system.used_memory(),
                    free: system.free_memory(),
                });
            }
        }

        if included.contains(IncludedInfo::DISK) {
            let disks = Disks::new_with_refreshed_list();
            report.disk = disks.list().first().map(|disk| DiskReport {
                path: disk.mount_point().display().to_string(),
                total: disk.total_space(),
                used: disk.total_space().saturating_sub(disk.available_space()),
                free: disk.available_space(),
            });
        }

        if included.contains(IncludedInfo::MAC_ADDR) {
            let networks = Networks::new_with_refreshed_list();
            report.mac_addr = networks
                .iter()
                .map(|(_, data)| data.mac_address())
                .find(|mac| *mac != MacAddr::UNSPECIFIED)
                .map(|mac| mac.to_string());
        }

        report
    }

    /// Serializes the report as JSON bytes for use as a message body.
    pub fn to_json(&self) -> Vec<u8> {
        // a plain data struct always serializes
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Reads a report back from a JSON message body.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
