mod command;
mod presenter;

fn main() -> anyhow::Result<()> {
    command::run()
}
