//! 启动横幅：手机访问地址与终端二维码。

use std::io::{self, BufRead, IsTerminal, Write};
use std::net::{IpAddr, Ipv4Addr};

use qrcode::{Color, QrCode};

use crate::config::AppConfig;

/// 本机一个可用的局域网 IPv4 地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanAddress {
    pub ip: Ipv4Addr,
    pub interface: String,
}

/// 手机端应访问的主机地址
///
/// 依次使用 `public_host`、具体的监听地址、局域网网卡地址，都没有时退回 localhost。
pub fn advertised_host(config: &AppConfig) -> String {
    let public = config.display.public_host.trim();
    if !public.is_empty() {
        return public.to_string();
    }
    match config.server.host.parse::<IpAddr>() {
        Ok(ip) if !ip.is_unspecified() => config.server.host.clone(),
        Ok(_) => pick_lan_host(lan_addresses(), config.display.interactive_select),
        Err(_) => config.server.host.clone(),
    }
}

/// 带令牌的访问地址
pub fn access_url(config: &AppConfig) -> String {
    format!(
        "http://{}:{}/?token={}",
        advertised_host(config),
        config.server.port,
        config.server.token
    )
}

/// 列出所有非回环网卡上的 IPv4 地址
pub fn lan_addresses() -> Vec<LanAddress> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            log::warn!("获取网卡列表失败: {e}");
            return Vec::new();
        }
    };
    interfaces
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter_map(|iface| match iface.ip() {
            IpAddr::V4(ip) if !ip.is_loopback() => Some(LanAddress {
                ip,
                interface: iface.name,
            }),
            _ => None,
        })
        .collect()
}

/// 按 192.168.x.x、10.x.x.x、其他的顺序排列，同类保持原顺序
pub fn by_priority(mut addresses: Vec<LanAddress>) -> Vec<LanAddress> {
    addresses.sort_by_key(|addr| match addr.ip.octets() {
        [192, 168, ..] => 0,
        [10, ..] => 1,
        _ => 2,
    });
    addresses
}

fn pick_lan_host(addresses: Vec<LanAddress>, interactive: bool) -> String {
    let candidates = by_priority(addresses);
    let index = if interactive && candidates.len() > 1 && io::stdin().is_terminal() {
        prompt_choice(&candidates, io::stdin().lock(), io::stdout()).unwrap_or(0)
    } else {
        0
    };
    match candidates.get(index) {
        Some(addr) => {
            log::info!("使用地址 {} ({})", addr.ip, addr.interface);
            addr.ip.to_string()
        }
        None => {
            log::warn!("未找到可用网卡，使用 localhost");
            "localhost".to_string()
        }
    }
}

/// 列出候选地址并读取用户选择，空输入或无效输入选第一个
fn prompt_choice<R: BufRead, W: Write>(
    candidates: &[LanAddress],
    mut input: R,
    mut out: W,
) -> io::Result<usize> {
    let rule = "-".repeat(50);
    writeln!(out, "\n检测到多个网卡:")?;
    writeln!(out, "{rule}")?;
    for (i, addr) in candidates.iter().enumerate() {
        writeln!(out, "  [{}] {} ({})", i + 1, addr.ip, addr.interface)?;
    }
    writeln!(out, "{rule}")?;
    write!(out, "请选择地址 [1-{}]（默认 1）: ", candidates.len())?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(0);
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => Ok(n - 1),
        _ => {
            writeln!(out, "无效的选择，使用默认地址: {}", candidates[0].ip)?;
            Ok(0)
        }
    }
}

/// 用半高方块字符把二维码渲染为文本，每个字符表示上下两行模块
pub fn render_qr(data: &str) -> Option<String> {
    let code = QrCode::new(data.as_bytes()).ok()?;
    let modules = code.to_colors();
    let width = code.width();

    let mut result = String::new();
    for y in (0..width).step_by(2) {
        result.push_str("  ");
        for x in 0..width {
            let top = modules[y * width + x];
            let bottom = if y + 1 < width {
                modules[(y + 1) * width + x]
            } else {
                Color::Light
            };
            result.push(match (top, bottom) {
                (Color::Dark, Color::Dark) => '█',
                (Color::Dark, Color::Light) => '▀',
                (Color::Light, Color::Dark) => '▄',
                (Color::Light, Color::Light) => ' ',
            });
        }
        result.push('\n');
    }
    Some(result)
}

/// 在终端打印访问地址和二维码
pub fn print_banner(config: &AppConfig) {
    let url = access_url(config);
    let rule = "=".repeat(40);
    println!("\n{rule}");
    println!("AirHID 已启动");
    println!("请用手机浏览器访问: {url}");
    println!("{rule}\n");

    if config.display.show_qr {
        match render_qr(&url) {
            Some(qr) => println!("{qr}"),
            None => log::warn!("生成二维码失败"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, public_host: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.server.host = host.to_string();
        config.server.token = "t0k".to_string();
        config.display.public_host = public_host.to_string();
        config
    }

    #[test]
    fn public_host_overrides_bind_host() {
        let config = config("0.0.0.0", "pc.lan");
        assert_eq!(access_url(&config), "http://pc.lan:5000/?token=t0k");
    }

    #[test]
    fn concrete_bind_host_is_advertised() {
        assert_eq!(advertised_host(&config("192.168.3.7", "")), "192.168.3.7");
        assert_eq!(advertised_host(&config("my-host", "")), "my-host");
    }

    #[test]
    fn unspecified_bind_host_never_advertises_zeros() {
        assert_ne!(advertised_host(&config("0.0.0.0", "")), "0.0.0.0");
    }

    fn lan(ip: [u8; 4], interface: &str) -> LanAddress {
        LanAddress {
            ip: Ipv4Addr::from(ip),
            interface: interface.to_string(),
        }
    }

    #[test]
    fn home_network_is_preferred_over_vpn_and_virtual_adapters() {
        let ordered = by_priority(vec![
            lan([172, 24, 16, 1], "vEthernet (WSL)"),
            lan([10, 8, 0, 5], "tun0"),
            lan([192, 168, 1, 23], "wlan0"),
            lan([10, 0, 0, 7], "eth1"),
        ]);
        let names: Vec<_> = ordered.iter().map(|a| a.interface.as_str()).collect();
        assert_eq!(names, vec!["wlan0", "tun0", "eth1", "vEthernet (WSL)"]);
    }

    #[test]
    fn no_interfaces_falls_back_to_localhost() {
        assert_eq!(pick_lan_host(Vec::new(), false), "localhost");
        assert_eq!(
            pick_lan_host(
                vec![lan([172, 17, 0, 1], "docker0"), lan([192, 168, 0, 9], "en0")],
                false
            ),
            "192.168.0.9"
        );
    }

    #[test]
    fn prompt_picks_the_numbered_address() {
        let candidates = vec![lan([192, 168, 1, 23], "wlan0"), lan([10, 8, 0, 5], "tun0")];
        let mut out = Vec::new();
        let index = prompt_choice(&candidates, &b"2\n"[..], &mut out).unwrap();
        assert_eq!(index, 1);
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("[1] 192.168.1.23 (wlan0)"), "{shown}");
        assert!(shown.contains("[2] 10.8.0.5 (tun0)"), "{shown}");
    }

    #[test]
    fn prompt_defaults_to_first_on_empty_or_invalid_input() {
        let candidates = vec![lan([192, 168, 1, 23], "wlan0"), lan([10, 8, 0, 5], "tun0")];
        for input in ["\n", "", "3\n", "abc\n", "0\n"] {
            let mut out = Vec::new();
            assert_eq!(
                prompt_choice(&candidates, input.as_bytes(), &mut out).unwrap(),
                0,
                "{input:?}"
            );
        }
    }

    #[test]
    fn qr_rows_are_halved() {
        let qr = render_qr("http://192.168.1.2:5000/?token=abc").unwrap();
        let code = QrCode::new(b"http://192.168.1.2:5000/?token=abc").unwrap();
        assert_eq!(qr.lines().count(), (code.width() + 1) / 2);
        assert!(qr.contains('█'));
    }
}
