use crate::{Error, NAME_MAX_LEN, Result};

/// 路径在扁平命名空间中指向的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Root,
    File(&'a str),
}

/// 把绝对路径解析为根目录或根目录下的文件名。
///
/// 只有一层目录，名称中再出现`/`即意味着父目录不存在。
pub fn resolve(path: &str) -> Result<Target<'_>> {
    let name = path.trim_start_matches('/');
    if name.is_empty() {
        return Ok(Target::Root);
    }

    if name.contains('/') {
        return Err(Error::NotFound);
    }
    if name.contains('\0') {
        return Err(Error::InvalidName);
    }
    if name.len() > NAME_MAX_LEN {
        return Err(Error::NameTooLong);
    }

    Ok(Target::File(name))
}

/// 解析出文件名，根目录报`IsADirectory`。
pub fn file_name(path: &str) -> Result<&str> {
    match resolve(path)? {
        Target::Root => Err(Error::IsADirectory),
        Target::File(name) => Ok(name),
    }
}
