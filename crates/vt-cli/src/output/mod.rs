//! Terminal output: profile tables, session reports and status lines

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{settings::Style, Table, Tabled};

use vt_core::config::{VehicleBook, VehicleProfile};
use vt_session::{Diagnostics, FileLocation, FileStatus, SizeCheck, WriteReport};

/// Format vehicle profiles as a table
///
/// The long form adds per-side usernames, working directory and the jump
/// host login string.
pub fn format_profiles(book: &VehicleBook, long: bool) -> String {
    if book.is_empty() {
        return "No vehicle profiles".to_string();
    }

    #[derive(Tabled)]
    struct ProfileRow {
        #[tabled(rename = "VEHICLE")]
        name: String,
        #[tabled(rename = "TYPE")]
        connection: String,
        #[tabled(rename = "A SIDE")]
        a_side: String,
        #[tabled(rename = "B SIDE")]
        b_side: String,
        #[tabled(rename = "PORT")]
        port: u16,
    }

    #[derive(Tabled)]
    struct ProfileRowLong {
        #[tabled(rename = "VEHICLE")]
        name: String,
        #[tabled(rename = "TYPE")]
        connection: String,
        #[tabled(rename = "A SIDE")]
        a_side: String,
        #[tabled(rename = "B SIDE")]
        b_side: String,
        #[tabled(rename = "PORT")]
        port: u16,
        #[tabled(rename = "PREFERRED")]
        preferred: String,
        #[tabled(rename = "JUMP HOST")]
        ssh_command: String,
        #[tabled(rename = "WORKING DIRECTORY")]
        working_directory: String,
    }

    if long {
        let rows: Vec<ProfileRowLong> = book
            .iter()
            .map(|(name, p)| ProfileRowLong {
                name: name.to_string(),
                connection: p.connection_type.to_string(),
                a_side: side_label(p.a_side_username.as_deref(), &p.a_side),
                b_side: side_label(p.b_side_username.as_deref(), &p.b_side),
                port: p.port,
                preferred: p.preferred_side.to_string(),
                ssh_command: dash(p.ssh_command.as_deref()),
                working_directory: dash(p.working_directory.as_deref()),
            })
            .collect();
        Table::new(rows).with(Style::rounded()).to_string()
    } else {
        let rows: Vec<ProfileRow> = book
            .iter()
            .map(|(name, p)| ProfileRow {
                name: name.to_string(),
                connection: p.connection_type.to_string(),
                a_side: p.a_side.clone(),
                b_side: p.b_side.clone(),
                port: p.port,
            })
            .collect();
        Table::new(rows).with(Style::rounded()).to_string()
    }
}

/// One-line description of a profile, used before connecting
pub fn describe_profile(name: &str, profile: &VehicleProfile) -> String {
    match (&profile.ssh_command, profile.is_direct()) {
        (Some(login), false) => format!("{} via {} (port {})", name, login, profile.port),
        _ => format!("{} direct (port {})", name, profile.port),
    }
}

pub fn format_file_status(status: &FileStatus) -> String {
    let state = match status.location {
        FileLocation::Primary => "found",
        FileLocation::Fallback => "found at fallback location",
        FileLocation::Missing => "missing, will be created on write",
    };
    format!("{:<7} {} ({})", status.kind.to_string(), status.path, state)
}

pub fn format_write_report(report: &WriteReport) -> String {
    match report.size_check {
        SizeCheck::Match => format!("Wrote {} bytes to {}", report.bytes, report.path),
        SizeCheck::Mismatch { remote } => format!(
            "Wrote {} bytes to {} (remote reports {} bytes)",
            report.bytes, report.path, remote
        ),
        SizeCheck::Unavailable => format!(
            "Wrote {} bytes to {} (size not verified)",
            report.bytes, report.path
        ),
    }
}

/// Multi-line session report
pub fn format_diagnostics(report: &Diagnostics) -> String {
    let mut output = String::new();

    output.push_str(&format!("Vehicle: {}\n", dash(report.car_name.as_deref())));
    output.push_str(&format!(
        "Mode: {}\n",
        if report.direct_mode { "direct" } else { "tunnel" }
    ));
    output.push_str(&format!("Host: {}\n", dash(report.host.as_deref())));
    output.push_str(&format!(
        "Side: {}\n",
        match (&report.side, &report.side_ip) {
            (Some(side), Some(ip)) => format!(
                "{} ({}@{})",
                side,
                report.side_username.as_deref().unwrap_or("?"),
                ip
            ),
            _ => "-".to_string(),
        }
    ));
    output.push_str(&format!("Working directory: {}\n", report.working_directory));

    for (label, probe) in [
        ("jump host", &report.vehicle_probe),
        ("side", &report.side_probe),
    ] {
        match probe {
            Some(Ok(out)) => {
                output.push_str(&format!("\n--- {} ---\n", label));
                output.push_str(out.trim_end());
                output.push('\n');
            }
            Some(Err(e)) => output.push_str(&format!("\n--- {} ---\nerror: {}\n", label, e)),
            None => {}
        }
    }

    output
}

fn side_label(username: Option<&str>, ip: &str) -> String {
    match username {
        Some(user) => format!("{}@{}", user, ip),
        None => ip.to_string(),
    }
}

fn dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn print_status(color: Color, symbol: &str, msg: &str, to_stderr: bool) {
    if to_stderr {
        write_status(&mut std::io::stderr(), color, symbol, msg);
    } else {
        write_status(&mut std::io::stdout(), color, symbol, msg);
    }
}

fn write_status(out: &mut impl Write, color: Color, symbol: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(symbol),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Green check mark line on stdout
pub fn print_success(msg: &str) {
    print_status(Color::Green, "✓ ", msg, false);
}

/// Red cross line on stderr
pub fn print_error(msg: &str) {
    print_status(Color::Red, "✗ ", msg, true);
}

pub fn print_warning(msg: &str) {
    print_status(Color::Yellow, "⚠ ", msg, true);
}

/// Informational line on stderr, so piped file content stays clean
pub fn print_info(msg: &str) {
    print_status(Color::Cyan, "ℹ ", msg, true);
}
