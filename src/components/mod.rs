mod animated_loading;
mod home_page;
mod lifecycle;
mod list;
mod movie_details_page;
mod movie_item;
mod youtube_embed;

pub use animated_loading::AnimatedLoading;
pub use home_page::{HomeData, HomePage, RandomPolicy};
pub use lifecycle::{AttachToken, Lifecycle, LifecycleState};
pub use list::render_movies_in_list;
pub use movie_details_page::{MovieDetailsPage, MovieId, MOVIE_ID_ATTRIBUTE};
pub use movie_item::MovieItem;
pub use youtube_embed::{parse_video_url, EmbedError, EmbedRef, YouTubeEmbed};
