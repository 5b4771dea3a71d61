//! Terminal display utilities

use colored::Colorize;
use floorboard_client::format::COMMUNITY_GUIDELINES;
use floorboard_core::Floor;

use crate::view::FeedLine;

pub fn print_banner() {
    println!();
    println!("{}", "╔═══════════════════════════════════════════════════╗".cyan());
    println!("{}", "║      Floorboard - Your Building's Message Board   ║".cyan());
    println!("{}", "╚═══════════════════════════════════════════════════╝".cyan());
    println!();
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg.green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg.dimmed());
}

pub fn print_error(msg: &str) {
    println!("{} {}", "✗".red().bold(), msg.red());
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg.yellow());
}

/// Prompt showing the current page
pub fn print_prompt(location: &str) {
    print!("{} {} ", format!("[{}]", location).cyan(), ">".green());
}

pub fn print_interactive_help() {
    println!();
    println!("{}", "Commands:".yellow().bold());
    println!("  {}      - Enter the building passcode", "/unlock <code>".cyan());
    println!("  {}  - Sign in", "/login <email> <password>".cyan());
    println!("  {}                 - Floor directory", "/home".cyan());
    println!("  {}      - Open a floor's feed", "/floor <n|general>".cyan());
    println!("  {}        - Post to the current floor", "/post <message>".cyan());
    println!("  {}              - Post shorthand on a floor page", "<message>".cyan());
    println!("  {}                - Resend a message that failed to post", "/retry".cyan());
    println!("  {}             - Scroll up through history", "/up [n]".cyan());
    println!("  {}                 - Jump to the newest message", "/jump".cyan());
    println!("  {}              - Account details", "/account".cyan());
    println!("  {}  - Change password", "/password <new>".cyan());
    println!("  {}               - Sign out", "/logout".cyan());
    println!("  {}                 - Exit", "/quit".cyan());
    println!();
}

/// The home page floor directory
pub fn print_floor_directory(selected: Floor) {
    println!();
    println!("{}", "Floors:".yellow().bold());
    println!("{}", "───────────────────────────────────────".dimmed());
    for floor in Floor::directory() {
        let marker = if floor == selected { "•".green() } else { "•".white() };
        let command = if floor.is_general() {
            "/floor general".to_string()
        } else {
            format!("/floor {}", floor.number())
        };
        println!("  {} {} {}", marker, floor.title().cyan(), command.dimmed());
    }
    println!();
}

pub fn print_floor_header(title: &str, count_label: &str, degraded: bool) {
    println!();
    println!(
        "{} {} {}",
        "─".repeat(10).dimmed(),
        format!("{} ({})", title, count_label).yellow().bold(),
        "─".repeat(10).dimmed()
    );
    if degraded {
        print_warning("Live updates unavailable, showing saved messages");
    }
}

pub fn print_feed_lines(lines: &[FeedLine]) {
    for line in lines {
        match line {
            FeedLine::Day(day) => println!("{}", format!("    {}", day).dimmed()),
            FeedLine::Message {
                time,
                author,
                text,
                own,
            } => {
                let author = format!("{}:", author);
                let author = if *own { author.cyan().bold() } else { author.magenta().bold() };
                println!("{} {} {}", format!("{:>8}", time).dimmed(), author, text);
            }
        }
    }
}

pub fn print_empty_floor() {
    println!("{}", "    No messages yet. Start the conversation!".dimmed());
}

pub fn print_jump_affordance() {
    println!("{}", "    ↓ newer messages below - /jump".blue());
}

pub fn print_guidelines() {
    println!("{}", "Community guidelines:".dimmed());
    for guideline in COMMUNITY_GUIDELINES {
        println!("  {} {}", "•".dimmed(), guideline.dimmed());
    }
}

pub fn print_account(email: &str, username: Option<&str>) {
    println!();
    println!("{}", "Account:".yellow().bold());
    println!("{}", "───────────────────────────────────────".dimmed());
    println!("  {} {}", "Email:".cyan(), email);
    println!("  {} {}", "Username:".cyan(), username.unwrap_or("-"));
    println!();
}

pub fn print_demo_mode() {
    println!();
    println!("{}", "════════════════════════════════════════════════════".yellow());
    println!("{}", "  Running in DEMO mode - simulated neighbors        ".yellow());
    println!("{}", "════════════════════════════════════════════════════".yellow());
    println!();
}
