use std::fs;
use std::io;
use std::path::Path;

use clap_complete::Shell;

const BIN: &str = "keycmd";
const USAGE: &str = "usage: cargo xtask <man|completions>";

fn main() {
    let task = std::env::args().nth(1);

    let result = match task.as_deref() {
        Some("man") => generate_man_pages(Path::new("man")),
        Some("completions") => generate_completions(Path::new("completions")),
        Some(other) => {
            eprintln!("unknown xtask command: {other}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("xtask failed: {e}");
        std::process::exit(1);
    }
}

fn generate_man_pages(out_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(out_dir)?;
    let cmd = keycmd::command();

    render_man_page(&cmd, BIN, out_dir)?;
    let count = 1 + render_subcommands(&cmd, BIN, out_dir)?;

    println!("Generated {count} man pages in {}", out_dir.display());
    Ok(())
}

/// Renders one page per subcommand, named `keycmd-<sub>[-<nested>]`.
fn render_subcommands(cmd: &clap::Command, prefix: &str, out_dir: &Path) -> io::Result<usize> {
    let mut count = 0;
    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        let page_name = format!("{prefix}-{}", sub.get_name());
        render_man_page(sub, &page_name, out_dir)?;
        count += 1 + render_subcommands(sub, &page_name, out_dir)?;
    }
    Ok(count)
}

fn render_man_page(cmd: &clap::Command, name: &str, out_dir: &Path) -> io::Result<()> {
    let path = out_dir.join(format!("{name}.1"));
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone().name(name.to_owned())).render(&mut buf)?;
    fs::write(&path, buf)?;
    println!("  {}", path.display());
    Ok(())
}

fn generate_completions(out_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(out_dir)?;
    let mut cmd = keycmd::command();
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        let path = clap_complete::generate_to(shell, &mut cmd, BIN, out_dir)?;
        println!("  {}", path.display());
    }
    Ok(())
}
