use anyhow::Result;

fn main() -> Result<()> {
    resmerge_cli::main_entry()
}
