pub mod csv_dataset;

pub use csv_dataset::{read_csv_dataset, read_csv_dataset_with_config, CsvReaderConfig};
