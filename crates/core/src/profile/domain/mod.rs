pub mod country_profile;
