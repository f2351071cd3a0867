//! Главный исполняемый файл bidstore

use anyhow::Context;
use bidstore::cli::{init_logging, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::init();
    let config = cli.load_config().context("Не удалось загрузить конфигурацию")?;
    init_logging(&config.log_level);
    log::debug!("Конфигурация: {:?}", config);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut output = stdout.lock();
    cli.execute(&config, stdin.lock(), &mut output)
        .context("Команда завершилась с ошибкой")?;
    Ok(())
}
