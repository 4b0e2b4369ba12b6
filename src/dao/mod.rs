pub mod sales;
