use anyhow::Result;

fn main() -> Result<()> {
    drilldown_cli::main_entry()
}
