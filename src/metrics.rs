use std::time::Duration;

/// Cumulative CPU jiffies (or 100ns ticks on Windows) for the status panel's load figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Cumulative network byte counters across non-loopback interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// One round of readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub cpu_percent: Option<f32>,
    pub memory_percent: Option<f32>,
    /// Bytes per second received.
    pub down_rate: Option<f64>,
    /// Bytes per second sent.
    pub up_rate: Option<f64>,
}

/// Bar colour band for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Normal,
    Elevated,
    Critical,
}

pub fn level(percent: f32) -> Level {
    if percent < 60.0 {
        Level::Normal
    } else if percent < 80.0 {
        Level::Elevated
    } else {
        Level::Critical
    }
}

/// Human-readable transfer rate.
pub fn format_rate(bytes_per_sec: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    if bytes_per_sec < KB {
        format!("{bytes_per_sec:.0} B/s")
    } else if bytes_per_sec < MB {
        format!("{:.1} KB/s", bytes_per_sec / KB)
    } else {
        format!("{:.1} MB/s", bytes_per_sec / MB)
    }
}

/// CPU busy percentage between two readings.
pub fn cpu_usage(prev: CpuTimes, cur: CpuTimes) -> Option<f32> {
    let total = cur.total.checked_sub(prev.total)?;
    let idle = cur.idle.checked_sub(prev.idle)?;
    if total == 0 {
        return None;
    }
    let busy = total.saturating_sub(idle);
    Some((busy as f64 / total as f64 * 100.0) as f32)
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
pub fn parse_proc_stat(text: &str) -> Option<CpuTimes> {
    let line = text.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().ok())
        .collect::<Option<_>>()?;
    if fields.len() < 4 {
        return None;
    }
    // idle + iowait count as idle time.
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    // guest time is already folded into user/nice.
    let total = fields.iter().take(8).sum();
    Some(CpuTimes { idle, total })
}

/// Used-memory percentage from `/proc/meminfo`.
pub fn parse_meminfo(text: &str) -> Option<f32> {
    let field = |name: &str| -> Option<u64> {
        let line = text.lines().find(|l| l.starts_with(name))?;
        line[name.len()..].split_whitespace().next()?.parse().ok()
    };
    let total = field("MemTotal:")?;
    let available = field("MemAvailable:")?;
    if total == 0 {
        return None;
    }
    Some((total.saturating_sub(available) as f64 / total as f64 * 100.0) as f32)
}

/// Sum byte counters from `/proc/net/dev`, skipping loopback.
pub fn parse_net_dev(text: &str) -> Option<NetCounters> {
    let mut counters = NetCounters {
        rx_bytes: 0,
        tx_bytes: 0,
    };
    let mut seen = false;
    for line in text.lines().skip(2) {
        let Some((iface, rest)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        let (Ok(rx), Ok(tx)) = (fields[0].parse::<u64>(), fields[8].parse::<u64>()) else {
            continue;
        };
        counters.rx_bytes += rx;
        counters.tx_bytes += tx;
        seen = true;
    }
    seen.then_some(counters)
}

/// Keeps the previous counters so each sample can report rates.
///
/// Linux reads procfs; Windows asks Win32 for CPU and memory only. Anything
/// a platform cannot provide is reported as `None`.
pub struct MetricsSampler {
    prev_cpu: Option<CpuTimes>,
    prev_net: Option<(Duration, NetCounters)>,
}

impl MetricsSampler {
    /// Primes the counters so the first `sample` already has a baseline.
    pub fn new(now: Duration) -> Self {
        Self {
            prev_cpu: read_cpu_times(),
            prev_net: read_net_counters().map(|c| (now, c)),
        }
    }

    pub fn sample(&mut self, now: Duration) -> Snapshot {
        self.sample_from(now, read_cpu_times(), read_memory_percent(), read_net_counters())
    }

    /// Fold raw readings into a snapshot and keep them as the new baseline.
    pub fn sample_from(
        &mut self,
        now: Duration,
        cpu: Option<CpuTimes>,
        memory_percent: Option<f32>,
        net: Option<NetCounters>,
    ) -> Snapshot {
        let cpu_percent = match (self.prev_cpu, cpu) {
            (Some(prev), Some(cur)) => cpu_usage(prev, cur),
            _ => None,
        };
        if cpu.is_some() {
            self.prev_cpu = cpu;
        }

        let mut down_rate = None;
        let mut up_rate = None;
        if let Some(cur) = net {
            if let Some((then, prev)) = self.prev_net {
                let secs = now.saturating_sub(then).as_secs_f64();
                if secs > 0.0 {
                    down_rate = Some(cur.rx_bytes.saturating_sub(prev.rx_bytes) as f64 / secs);
                    up_rate = Some(cur.tx_bytes.saturating_sub(prev.tx_bytes) as f64 / secs);
                }
            }
            self.prev_net = Some((now, cur));
        }

        Snapshot {
            cpu_percent,
            memory_percent,
            down_rate,
            up_rate,
        }
    }
}

#[cfg(target_os = "linux")]
fn read_cpu_times() -> Option<CpuTimes> {
    parse_proc_stat(&std::fs::read_to_string("/proc/stat").ok()?)
}

#[cfg(target_os = "linux")]
fn read_memory_percent() -> Option<f32> {
    parse_meminfo(&std::fs::read_to_string("/proc/meminfo").ok()?)
}

#[cfg(target_os = "linux")]
fn read_net_counters() -> Option<NetCounters> {
    parse_net_dev(&std::fs::read_to_string("/proc/net/dev").ok()?)
}

#[cfg(windows)]
fn read_cpu_times() -> Option<CpuTimes> {
    crate::platform::win32::cpu_times()
}

#[cfg(windows)]
fn read_memory_percent() -> Option<f32> {
    crate::platform::win32::memory_load()
}

#[cfg(windows)]
fn read_net_counters() -> Option<NetCounters> {
    None
}

#[cfg(not(any(target_os = "linux", windows)))]
fn read_cpu_times() -> Option<CpuTimes> {
    None
}

#[cfg(not(any(target_os = "linux", windows)))]
fn read_memory_percent() -> Option<f32> {
    None
}

#[cfg(not(any(target_os = "linux", windows)))]
fn read_net_counters() -> Option<NetCounters> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "\
cpu  100 0 100 700 100 0 0 0 0 0
cpu0 50 0 50 350 50 0 0 0 0 0
intr 12345
";

    const MEMINFO: &str = "\
MemTotal:       16000000 kB
MemFree:         2000000 kB
MemAvailable:    4000000 kB
Buffers:          100000 kB
";

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 9999999     100    0    0    0     0          0         0  9999999     100    0    0    0     0       0          0
  eth0: 1000        10    0    0    0     0          0         0     500       5    0    0    0     0       0          0
 wlan0: 24          1    0    0    0     0          0         0      12       1    0    0    0     0       0          0
";

    #[test]
    fn proc_stat_totals() {
        let t = parse_proc_stat(PROC_STAT).unwrap();
        assert_eq!(t, CpuTimes { idle: 800, total: 1000 });
    }

    #[test]
    fn cpu_usage_between_samples() {
        let a = CpuTimes { idle: 800, total: 1000 };
        let b = CpuTimes { idle: 850, total: 1200 };
        assert_eq!(cpu_usage(a, b), Some(75.0));
        assert_eq!(cpu_usage(a, a), None);
    }

    #[test]
    fn meminfo_used_percent() {
        assert_eq!(parse_meminfo(MEMINFO), Some(75.0));
        assert_eq!(parse_meminfo("MemTotal: 10 kB\n"), None);
    }

    #[test]
    fn net_dev_skips_loopback() {
        assert_eq!(
            parse_net_dev(NET_DEV),
            Some(NetCounters {
                rx_bytes: 1024,
                tx_bytes: 512
            })
        );
        assert_eq!(parse_net_dev("header\nheader\n"), None);
    }

    #[test]
    fn rates_use_elapsed_time() {
        let mut s = MetricsSampler {
            prev_cpu: None,
            prev_net: None,
        };
        let net = |rx, tx| {
            Some(NetCounters {
                rx_bytes: rx,
                tx_bytes: tx,
            })
        };
        let first = s.sample_from(Duration::from_secs(1), None, Some(40.0), net(0, 0));
        assert_eq!(first.down_rate, None);
        let second = s.sample_from(Duration::from_secs(3), None, None, net(4096, 1024));
        assert_eq!(second.down_rate, Some(2048.0));
        assert_eq!(second.up_rate, Some(512.0));
    }

    #[test]
    fn rate_formatting() {
        assert_eq!(format_rate(512.0), "512 B/s");
        assert_eq!(format_rate(2048.0), "2.0 KB/s");
        assert_eq!(format_rate(3.5 * 1024.0 * 1024.0), "3.5 MB/s");
    }

    #[test]
    fn level_bands() {
        assert_eq!(level(10.0), Level::Normal);
        assert_eq!(level(60.0), Level::Elevated);
        assert_eq!(level(95.0), Level::Critical);
    }
}
