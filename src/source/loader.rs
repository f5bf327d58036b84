//! # 加载与校验
//!
//! ## 设计思路
//!
//! 尽早失败：先只读文件头拿到宽高，超过 16 位上限直接拒绝，
//! 再进行完整解码，避免超大图片白白占用内存与 CPU。
//!
//! ## 实现思路
//!
//! 1. `ImageReader::open` + 格式嗅探（不依赖扩展名）
//! 2. 读取 header 尺寸并校验
//! 3. 完整解码并转换为 RGBA8
//! 4. 转换为 ARGB32 并构造 `SourceImage`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::ImageReader;

use super::{ImageError, SourceImage};

/// 从文件加载源图。
pub fn load_image(path: &Path) -> Result<SourceImage, ImageError> {
    log::debug!("loading {}", path.display());

    let (header_width, header_height) = open_reader(path)?
        .into_dimensions()
        .map_err(|e| decode_error(path, e))?;
    validate_dimensions(header_width, header_height)?;

    let decoded = open_reader(path)?
        .decode()
        .map_err(|e| decode_error(path, e))?;

    let rgba = decoded.into_rgba8();
    let (width, height) = rgba.dimensions();
    let image = SourceImage::from_rgba(width, height, rgba.into_raw())?;

    log::info!("✅ 已加载 {}（{}x{}）", path.display(), width, height);
    Ok(image)
}

fn open_reader(
    path: &Path,
) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, ImageError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| ImageError::FileSystem {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), ImageError> {
    if width == 0 || height == 0 || width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(ImageError::IllegalDimensions { width, height });
    }
    Ok(())
}

fn decode_error(path: &Path, err: image::ImageError) -> ImageError {
    ImageError::Decode {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// 按路径缓存的源图集合。
///
/// 一个文件可以同时被多个选项引用（例如不同输出使用不同模式），
/// 这里保证每个路径只解码一次。失败同样被记住，后续引用直接跳过。
#[derive(Default)]
pub struct ImageCache {
    entries: HashMap<PathBuf, Option<Rc<SourceImage>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取已加载的源图；首次访问时解码。
    pub fn get_or_load(&mut self, path: &Path) -> Result<Rc<SourceImage>, ImageError> {
        self.get_or_load_with(path, load_image)
    }

    /// 同 [`get_or_load`](Self::get_or_load)，但允许注入解码函数（便于测试）。
    pub fn get_or_load_with<F>(&mut self, path: &Path, load: F) -> Result<Rc<SourceImage>, ImageError>
    where
        F: FnOnce(&Path) -> Result<SourceImage, ImageError>,
    {
        if let Some(entry) = self.entries.get(path) {
            return entry.clone().ok_or_else(|| ImageError::PreviouslyFailed {
                path: path.to_path_buf(),
            });
        }

        match load(path) {
            Ok(image) => {
                let image = Rc::new(image);
                self.entries.insert(path.to_path_buf(), Some(Rc::clone(&image)));
                Ok(image)
            }
            Err(err) => {
                self.entries.insert(path.to_path_buf(), None);
                Err(err)
            }
        }
    }

    /// 已成功加载的图片数量。
    pub fn loaded_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::cell::Cell;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("xbackdrop_{}_{}_{}", std::process::id(), nanos, name))
    }

    fn write_png(width: u32, height: u32) -> PathBuf {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, 0x80, 0xff])
        });
        let path = temp_path("image.png");
        img.save_with_format(&path, ImageFormat::Png)
            .expect("failed to write test png");
        path
    }

    #[test]
    fn test_load_png_converts_to_argb() {
        let path = write_png(4, 3);
        let image = load_image(&path).expect("png should load");
        let _ = std::fs::remove_file(&path);

        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 3);
        // (x=2, y=1) => r=2, g=1, b=0x80, a=0xff
        assert_eq!(image.pixel(2, 1), Some(0xff02_0180));
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let err = load_image(&temp_path("missing.png")).unwrap_err();
        assert!(matches!(err, ImageError::FileSystem { .. }));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let path = temp_path("garbage.png");
        std::fs::write(&path, b"definitely not an image").expect("write garbage");
        let err = load_image(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, ImageError::Decode { .. }));
    }

    #[test]
    fn test_cache_decodes_each_path_once() {
        let mut cache = ImageCache::new();
        let calls = Cell::new(0);
        let path = Path::new("/virtual/a.png");

        for _ in 0..3 {
            let image = cache
                .get_or_load_with(path, |_| {
                    calls.set(calls.get() + 1);
                    SourceImage::solid(2, 2, 0xff00_00ff)
                })
                .unwrap();
            assert_eq!(image.width(), 2);
        }

        assert_eq!(calls.get(), 1, "同一路径只应解码一次");
        assert_eq!(cache.loaded_count(), 1);
    }

    #[test]
    fn test_cache_remembers_failures() {
        let mut cache = ImageCache::new();
        let path = Path::new("/virtual/broken.png");

        let first = cache.get_or_load_with(path, |_| {
            Err(ImageError::IllegalDimensions { width: 70000, height: 1 })
        });
        assert!(matches!(first, Err(ImageError::IllegalDimensions { .. })));

        let second = cache.get_or_load_with(path, |_| SourceImage::solid(1, 1, 0));
        assert!(matches!(second, Err(ImageError::PreviouslyFailed { .. })));
        assert_eq!(cache.loaded_count(), 0);
    }
}
