pub mod catalog;
pub mod health;

pub use catalog::{
    collections, countries, country_detail, genre_detail, genres, latest_movies, movie_by_tmdb,
    movie_details, search, year_detail,
};
pub use health::health_check;
