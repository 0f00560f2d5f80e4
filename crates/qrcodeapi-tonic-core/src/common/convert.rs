//! Conversions between the wire messages and the core library types.

use crate::{Error, proto};
use qrcodeapi::{GenerationRequest, GenerationResponse};

impl From<proto::Request> for GenerationRequest {
    fn from(req: proto::Request) -> Self {
        Self {
            content: req.content,
            url: req.url,
            width: req.width,
            height: req.height,
            accept: req.accept,
        }
    }
}

impl From<GenerationRequest> for proto::Request {
    fn from(req: GenerationRequest) -> Self {
        Self {
            content: req.content,
            url: req.url,
            width: req.width,
            height: req.height,
            accept: req.accept,
        }
    }
}

impl TryFrom<GenerationResponse> for proto::Response {
    type Error = Error;

    fn try_from(res: GenerationResponse) -> Result<Self, Self::Error> {
        let dimension = |side: u32| {
            i32::try_from(side).map_err(|_| {
                Error::from(qrcodeapi::Error::InternalEncoding {
                    context: format!("rendered side {side} does not fit in int32"),
                })
            })
        };
        Ok(Self {
            content_type: res.content_type,
            width: dimension(res.width)?,
            height: dimension(res.height)?,
            image: res.image.into(),
        })
    }
}
