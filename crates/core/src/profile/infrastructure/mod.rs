pub mod country_table;
