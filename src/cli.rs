//! CLI интерфейс для bidstore
//!
//! Командная строка и интерактивное меню поверх одного индекса заявок.
//! Меню работает с произвольными `BufRead`/`Write`, поэтому тестируется без
//! консоли.

use crate::common::{Bid, BidStoreConfig, Error, Result};
use crate::executor::sort::{sort_bids, SortAlgorithm};
use crate::storage::index::{create_index, Index};
use crate::storage::loader::BidCsvReader;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Файл конфигурации, который читается, если `--config` не указан
pub const DEFAULT_CONFIG_FILE: &str = "bidstore.toml";

/// bidstore - хранилища заявок в памяти
#[derive(Parser, Debug)]
#[command(name = "bidstore")]
#[command(about = "In-memory bid stores backed by a binary search tree or a chained hash table")]
#[command(version)]
pub struct Cli {
    /// Конфигурационный файл
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Уровень детализации логирования
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Тип индекса (tree, hash)
    #[arg(short, long, value_name = "INDEX")]
    pub index: Option<String>,

    /// Количество корзин хеш-таблицы
    #[arg(long, value_name = "BUCKETS")]
    pub buckets: Option<usize>,

    /// CSV-выгрузка заявок
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Интерактивное меню (по умолчанию)
    Menu,

    /// Загрузить выгрузку и вывести все заявки в порядке обхода индекса
    List {
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },

    /// Загрузить выгрузку и найти заявку
    Find {
        /// Идентификатор заявки
        bid_id: String,

        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },

    /// Загрузить выгрузку и отсортировать заявки по названию
    Sort {
        /// Алгоритм (selection, quick)
        #[arg(short, long, default_value = "quick")]
        algorithm: String,
    },
}

impl Cli {
    /// Разбирает аргументы процесса
    pub fn init() -> Self {
        Self::parse()
    }

    /// Загружает конфигурацию: файл, затем окружение, затем аргументы
    pub fn load_config(&self) -> Result<BidStoreConfig> {
        let mut config = match &self.config {
            Some(path) => BidStoreConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                BidStoreConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => BidStoreConfig::default(),
        };
        config.apply_env()?;
        self.apply_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Применяет аргументы командной строки поверх конфигурации
    pub fn apply_overrides(&self, config: &mut BidStoreConfig) -> Result<()> {
        if let Some(index) = &self.index {
            config.index.index_type = index.parse()?;
        }
        if let Some(buckets) = self.buckets {
            config.index.bucket_count = buckets;
        }
        if let Some(csv) = &self.csv {
            config.csv_path = csv.clone();
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }
        Ok(())
    }

    /// Выполняет команду
    pub fn execute<R: BufRead, W: Write>(
        &self,
        config: &BidStoreConfig,
        input: R,
        output: &mut W,
    ) -> Result<()> {
        match &self.command {
            None | Some(Commands::Menu) => BidMenu::new(config.clone())?.run(input, output),
            Some(Commands::List { json }) => list_bids(config, *json, output),
            Some(Commands::Find { bid_id, json }) => find_bid(config, bid_id, *json, output),
            Some(Commands::Sort { algorithm }) => sort_command(config, algorithm.parse()?, output),
        }
    }
}

/// Инициализирует логирование: `RUST_LOG`, если задан, иначе `level`
pub fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // Повторная инициализация (например, в тестах) не является ошибкой
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Строка заявки; для заявки из корзины хеш-таблицы с префиксом её номера
pub fn format_bid(bid: &Bid, bucket: Option<usize>) -> String {
    match bucket {
        Some(bucket) => format!("Key {}: {}", bucket, bid),
        None => bid.to_string(),
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    format!(
        "time: {} microseconds\ntime: {:.6} seconds",
        elapsed.as_micros(),
        elapsed.as_secs_f64()
    )
}

fn loaded_index(config: &BidStoreConfig) -> Result<Box<dyn Index + Send>> {
    let mut index = create_index(&config.index)?;
    BidCsvReader::new(config.csv.clone()).load_file(&config.csv_path, index.as_mut())?;
    Ok(index)
}

fn list_bids<W: Write>(config: &BidStoreConfig, json: bool, output: &mut W) -> Result<()> {
    let index = loaded_index(config)?;
    if json {
        let bids: Vec<&Bid> = index.scan().collect();
        writeln!(output, "{}", serde_json::to_string_pretty(&bids)?)?;
        return Ok(());
    }
    for (bucket, bid) in index.scan_with_bucket() {
        writeln!(output, "{}", format_bid(bid, bucket))?;
    }
    Ok(())
}

fn find_bid<W: Write>(
    config: &BidStoreConfig,
    bid_id: &str,
    json: bool,
    output: &mut W,
) -> Result<()> {
    let index = loaded_index(config)?;
    let found = index.search(bid_id);
    if json {
        writeln!(output, "{}", serde_json::to_string_pretty(&found)?)?;
        return Ok(());
    }
    match found {
        Some(bid) => writeln!(output, "{}", bid)?,
        None => writeln!(output, "Bid Id {} not found.", bid_id)?,
    }
    Ok(())
}

fn sort_command<W: Write>(
    config: &BidStoreConfig,
    algorithm: SortAlgorithm,
    output: &mut W,
) -> Result<()> {
    let (mut bids, _) = BidCsvReader::new(config.csv.clone()).read_file(&config.csv_path)?;
    let start = Instant::now();
    sort_bids(algorithm, &mut bids);
    let elapsed = start.elapsed();
    for bid in &bids {
        writeln!(output, "{}", bid)?;
    }
    writeln!(output, "{} bids sorted", bids.len())?;
    writeln!(output, "{}", format_elapsed(elapsed))?;
    Ok(())
}

/// Интерактивное меню над одним индексом
pub struct BidMenu {
    index: Box<dyn Index + Send>,
    config: BidStoreConfig,
    reader: BidCsvReader,
}

impl BidMenu {
    /// Создает меню с пустым индексом, выбранным конфигурацией
    pub fn new(config: BidStoreConfig) -> Result<Self> {
        Ok(Self {
            index: create_index(&config.index)?,
            reader: BidCsvReader::new(config.csv.clone()),
            config,
        })
    }

    /// Индекс, которым управляет меню
    pub fn index(&self) -> &dyn Index {
        self.index.as_ref()
    }

    /// Цикл меню до выбора `9` или конца ввода
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, output: &mut W) -> Result<()> {
        loop {
            write_menu(output)?;
            let Some(choice) = read_line(&mut input)? else {
                break;
            };
            match choice.as_str() {
                "1" => self.load(output)?,
                "2" => self.display_all(output)?,
                "3" => {
                    let bid_id = self.prompt_bid_id(&mut input, output)?;
                    self.find(&bid_id, output)?;
                }
                "4" => {
                    let bid_id = self.prompt_bid_id(&mut input, output)?;
                    self.remove(&bid_id, output)?;
                }
                "5" => {
                    write!(output, "Algorithm (selection, quick) [quick]: ")?;
                    output.flush()?;
                    let answer = read_line(&mut input)?.unwrap_or_default();
                    let algorithm = if answer.is_empty() {
                        SortAlgorithm::Quick
                    } else {
                        match answer.parse() {
                            Ok(algorithm) => algorithm,
                            Err(err) => {
                                writeln!(output, "{}", err)?;
                                continue;
                            }
                        }
                    };
                    self.sort(algorithm, output)?;
                }
                "9" => break,
                "" => continue,
                other => writeln!(output, "{} is not a valid option.", other)?,
            }
        }
        writeln!(output, "Good bye.")?;
        Ok(())
    }

    fn load<W: Write>(&mut self, output: &mut W) -> Result<()> {
        writeln!(output, "Loading CSV file {}", self.config.csv_path.display())?;
        let start = Instant::now();
        match self
            .reader
            .load_file(&self.config.csv_path, self.index.as_mut())
        {
            Ok(report) => {
                writeln!(output, "{} bids read", report.loaded)?;
                if report.skipped > 0 {
                    writeln!(output, "{} rows skipped", report.skipped)?;
                }
            }
            // Ошибка загрузки не завершает меню
            Err(Error::Io(err)) => writeln!(output, "Failed to load bids: {}", err)?,
            Err(err) => return Err(err),
        }
        writeln!(output, "{}", format_elapsed(start.elapsed()))?;
        Ok(())
    }

    fn display_all<W: Write>(&self, output: &mut W) -> Result<()> {
        for (bucket, bid) in self.index.scan_with_bucket() {
            writeln!(output, "{}", format_bid(bid, bucket))?;
        }
        Ok(())
    }

    fn find<W: Write>(&self, bid_id: &str, output: &mut W) -> Result<()> {
        let start = Instant::now();
        let found = self.index.search(bid_id);
        let elapsed = start.elapsed();
        match found {
            Some(bid) => writeln!(output, "{}", bid)?,
            None => writeln!(output, "Bid Id {} not found.", bid_id)?,
        }
        writeln!(output, "{}", format_elapsed(elapsed))?;
        Ok(())
    }

    fn remove<W: Write>(&mut self, bid_id: &str, output: &mut W) -> Result<()> {
        if self.index.delete(bid_id) {
            writeln!(output, "Bid Id {} removed.", bid_id)?;
        } else {
            writeln!(output, "Bid Id {} not found.", bid_id)?;
        }
        Ok(())
    }

    fn sort<W: Write>(&self, algorithm: SortAlgorithm, output: &mut W) -> Result<()> {
        let mut bids: Vec<Bid> = self.index.scan().cloned().collect();
        let start = Instant::now();
        sort_bids(algorithm, &mut bids);
        let elapsed = start.elapsed();
        for bid in &bids {
            writeln!(output, "{}", bid)?;
        }
        writeln!(output, "{} bids sorted", bids.len())?;
        writeln!(output, "{}", format_elapsed(elapsed))?;
        Ok(())
    }

    fn prompt_bid_id<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<String> {
        write!(output, "Enter bid id [{}]: ", self.config.default_bid_key)?;
        output.flush()?;
        Ok(match read_line(input)? {
            Some(bid_id) if !bid_id.is_empty() => bid_id,
            _ => self.config.default_bid_key.clone(),
        })
    }
}

fn write_menu<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "Menu:")?;
    writeln!(output, "  1. Load Bids")?;
    writeln!(output, "  2. Display All Bids")?;
    writeln!(output, "  3. Find Bid")?;
    writeln!(output, "  4. Remove Bid")?;
    writeln!(output, "  5. Sort Bids By Title")?;
    writeln!(output, "  9. Exit")?;
    write!(output, "Enter choice: ")?;
    output.flush()?;
    Ok(())
}

/// Читает строку без перевода строки; `None` в конце ввода
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
