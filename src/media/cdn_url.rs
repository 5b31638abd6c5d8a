/// Hosted CDN URL handling
///
/// Delivery URLs look like
/// `https://res.cloudinary.com/<cloud>/<image|video>/upload/[<transformations>/][v<version>/]<public_id>.<ext>`.
/// Size variants are rebuilt from the cloud name and public id alone.
use crate::media::{ImageVariants, MediaFamily, SizeVariants, VideoVariants};

/// Delivery host of the CDN
pub const CDN_HOST: &str = "res.cloudinary.com";

const IMAGE_THUMBNAIL: &str = "c_fill,w_400,h_300,q_auto,f_auto";
const IMAGE_MEDIUM: &str = "c_limit,w_800,q_auto,f_auto";
const IMAGE_LARGE: &str = "c_limit,w_1600,q_auto,f_auto";
const IMAGE_BLUR: &str = "e_blur:1000,w_40,q_1,f_auto";
const IMAGE_ORIGINAL: &str = "q_auto,f_auto";

const VIDEO_THUMBNAIL: &str = "so_0,c_fill,w_640,h_360,q_auto";
const VIDEO_SD: &str = "c_limit,w_854,q_auto";
const VIDEO_HD: &str = "c_limit,w_1280,q_auto";
const VIDEO_ORIGINAL: &str = "q_auto";

/// A parsed CDN delivery URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnAsset {
    pub cloud_name: String,
    pub family: MediaFamily,
    pub public_id: String,
}

/// Parse a CDN delivery URL; `None` when the URL is not CDN hosted
pub fn parse(url: &str) -> Option<CdnAsset> {
    let without_scheme = url
        .trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))?;

    // Drop query string and fragment
    let without_query = without_scheme
        .split(&['?', '#'][..])
        .next()
        .unwrap_or_default();

    let (host, path) = without_query.split_once('/')?;
    if !host.eq_ignore_ascii_case(CDN_HOST) {
        return None;
    }

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let cloud_name = segments.next()?.to_string();
    let family = match segments.next()? {
        "image" => MediaFamily::Image,
        "video" => MediaFamily::Video,
        _ => return None,
    };
    if segments.next()? != "upload" {
        return None;
    }

    let rest: Vec<&str> = segments.collect();
    let (last, before_last) = rest.split_last()?;
    if is_version(last) {
        return None;
    }
    let start = match before_last.iter().position(|s| is_version(s)) {
        Some(version) => version + 1,
        None => before_last
            .iter()
            .take_while(|s| is_transformation(s))
            .count(),
    };

    let id_segments = &rest[start..];
    let (last, folders) = id_segments.split_last()?;
    let stem = match last.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => *last,
    };

    let mut parts: Vec<String> = folders.iter().map(|s| decode_segment(s)).collect();
    parts.push(decode_segment(stem));
    let public_id = parts.join("/");
    if public_id.is_empty() {
        return None;
    }

    Some(CdnAsset {
        cloud_name,
        family,
        public_id,
    })
}

/// Whether a URL is served by the hosted CDN
pub fn is_cdn_hosted(url: &str) -> bool {
    parse(url).is_some()
}

/// Extract the public id from a CDN URL
pub fn derive_public_id(url: &str) -> Option<String> {
    parse(url).map(|asset| asset.public_id)
}

/// Delivery URL for a public id with a transformation preset
pub fn delivery_url(
    cloud_name: &str,
    family: MediaFamily,
    transformation: &str,
    public_id: &str,
    extension: Option<&str>,
) -> String {
    let mut url = format!(
        "https://{}/{}/{}/upload/{}/{}",
        CDN_HOST,
        cloud_name,
        family.resource_type(),
        transformation,
        public_id
    );
    if let Some(ext) = extension {
        url.push('.');
        url.push_str(ext);
    }
    url
}

/// Responsive image renditions for a public id
pub fn image_variants(cloud_name: &str, public_id: &str) -> ImageVariants {
    let url = |preset| delivery_url(cloud_name, MediaFamily::Image, preset, public_id, None);
    ImageVariants {
        thumbnail: url(IMAGE_THUMBNAIL),
        medium: url(IMAGE_MEDIUM),
        large: url(IMAGE_LARGE),
        blur: url(IMAGE_BLUR),
        original: url(IMAGE_ORIGINAL),
    }
}

/// Video renditions for a public id; the thumbnail is a poster frame
pub fn video_variants(cloud_name: &str, public_id: &str) -> VideoVariants {
    let url = |preset, ext| delivery_url(cloud_name, MediaFamily::Video, preset, public_id, Some(ext));
    VideoVariants {
        thumbnail: url(VIDEO_THUMBNAIL, "jpg"),
        sd: url(VIDEO_SD, "mp4"),
        hd: url(VIDEO_HD, "mp4"),
        original: url(VIDEO_ORIGINAL, "mp4"),
    }
}

/// Variant set shaped for a media family
pub fn variants_for(family: MediaFamily, cloud_name: &str, public_id: &str) -> SizeVariants {
    match family {
        MediaFamily::Image => SizeVariants::Image(image_variants(cloud_name, public_id)),
        MediaFamily::Video => SizeVariants::Video(video_variants(cloud_name, public_id)),
    }
}

/// Transformation parameter keys the delivery API understands
const TRANSFORMATION_KEYS: &[&str] = &[
    "a", "ac", "af", "ar", "b", "bo", "br", "c", "co", "cs", "d", "dl", "dn", "dpr", "du", "e",
    "eo", "f", "fl", "fn", "fps", "g", "h", "ki", "l", "o", "p", "pg", "q", "r", "so", "sp", "t",
    "u", "vc", "vs", "w", "x", "y", "z",
];

/// Transformation segments are comma-separated `<key>_<value>` pairs whose
/// keys are all known parameters, e.g. `c_fill,w_300`
fn is_transformation(segment: &str) -> bool {
    !segment.is_empty()
        && segment.split(',').all(|part| match part.split_once('_') {
            Some((key, value)) => TRANSFORMATION_KEYS.contains(&key) && !value.is_empty(),
            None => false,
        })
}

fn is_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versioned_url() {
        let asset = parse(
            "https://res.cloudinary.com/demo/image/upload/v1700000000/school/images/abc123.jpg",
        )
        .unwrap();
        assert_eq!(asset.cloud_name, "demo");
        assert_eq!(asset.family, MediaFamily::Image);
        assert_eq!(asset.public_id, "school/images/abc123");
    }

    #[test]
    fn test_parse_strips_transformations_and_query() {
        let asset = parse(
            "https://res.cloudinary.com/demo/video/upload/c_limit,w_854,q_auto/v12/school/videos/clip.mp4?_a=1",
        )
        .unwrap();
        assert_eq!(asset.family, MediaFamily::Video);
        assert_eq!(asset.public_id, "school/videos/clip");
    }

    #[test]
    fn test_folder_with_underscore_is_not_a_transformation() {
        let id = derive_public_id(
            "https://res.cloudinary.com/demo/image/upload/school_site/hero_banner.png",
        );
        assert_eq!(id.as_deref(), Some("school_site/hero_banner"));
    }

    #[test]
    fn test_unversioned_folder_with_underscore_is_kept() {
        let id = derive_public_id(
            "https://res.cloudinary.com/demo/image/upload/pta_events/annual_day.jpg",
        );
        assert_eq!(id.as_deref(), Some("pta_events/annual_day"));
    }

    #[test]
    fn test_single_segment_id_with_underscore() {
        let id = derive_public_id("https://res.cloudinary.com/demo/image/upload/my_photo.jpg");
        assert_eq!(id.as_deref(), Some("my_photo"));
    }

    #[test]
    fn test_version_marker_strips_everything_before_it() {
        let id = derive_public_id(
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_200/l_badge,g_north/v9/pta_events/annual_day.jpg",
        );
        assert_eq!(id.as_deref(), Some("pta_events/annual_day"));
    }

    #[test]
    fn test_unversioned_transformation_is_stripped() {
        let id = derive_public_id(
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_200/school/images/abc.jpg",
        );
        assert_eq!(id.as_deref(), Some("school/images/abc"));
    }

    #[test]
    fn test_percent_encoded_id() {
        let id = derive_public_id("https://res.cloudinary.com/demo/image/upload/v1/annual%20day.jpg");
        assert_eq!(id.as_deref(), Some("annual day"));
    }

    #[test]
    fn test_non_cdn_urls() {
        assert!(!is_cdn_hosted("https://example.com/demo/image/upload/v1/a.jpg"));
        assert!(!is_cdn_hosted("/uploads/images/a.jpg"));
        assert!(!is_cdn_hosted("https://res.cloudinary.com/demo/raw/upload/v1/a.pdf"));
        assert!(!is_cdn_hosted("https://res.cloudinary.com/demo/image/upload/v1/"));
        assert!(!is_cdn_hosted("not a url"));
    }

    #[test]
    fn test_image_variants_are_derived_from_id() {
        let variants = image_variants("demo", "school/images/abc");
        assert_eq!(
            variants.thumbnail,
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_400,h_300,q_auto,f_auto/school/images/abc"
        );
        assert!(variants.blur.contains("e_blur:1000"));
        assert!(variants.original.ends_with("/q_auto,f_auto/school/images/abc"));
    }

    #[test]
    fn test_video_variants_have_extensions() {
        let variants = video_variants("demo", "school/videos/clip");
        assert!(variants.thumbnail.ends_with("school/videos/clip.jpg"));
        assert!(variants.sd.ends_with("school/videos/clip.mp4"));
        assert!(variants.hd.contains("w_1280"));
    }

    #[test]
    fn test_variant_urls_parse_back_to_same_id() {
        let variants = image_variants("demo", "school/gallery/sports-day");
        assert_eq!(
            derive_public_id(&variants.medium).as_deref(),
            Some("school/gallery/sports-day")
        );
    }
}
