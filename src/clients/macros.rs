/// Generate store request methods with oneshot channel boilerplate and
/// automatic tracing.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            #[tracing::instrument(level = "debug", skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $crate::store_actor::StoreError> {
                tracing::debug!("Sending request");
                let (respond_to, response) = tokio::sync::oneshot::channel();
                self.sender
                    .send($request::$variant {
                        $($param,)*
                        respond_to,
                    })
                    .await
                    .map_err(|_| $crate::store_actor::StoreError::ActorCommunicationError("Actor closed".to_string()))?;

                response
                    .await
                    .map_err(|_| $crate::store_actor::StoreError::ActorCommunicationError("Actor dropped".to_string()))?
            }
        }
    };
}

/// Generate `get_<entity>` / `require_<entity>` on a domain client that wraps
/// a `StoreClient` in its `store` field.
macro_rules! impl_lookup_methods {
    ($client:ident, $entity:ty, $id:ty, $error:ty, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: $id) -> Result<Option<$entity>, $error> {
                    tracing::debug!("Sending request");
                    self.store.[<get_ $entity_name_snake>](id).await.map_err(<$error>::from)
                }

                /// Like the `get_` variant, but a missing record is an error.
                #[tracing::instrument(skip(self))]
                pub async fn [<require_ $entity_name_snake>](&self, id: $id) -> Result<$entity, $error> {
                    self.[<get_ $entity_name_snake>](id).await?.ok_or_else(|| {
                        <$error>::from($crate::actor_framework::not_found::<$entity>(&id))
                    })
                }
            }
        }
    };
}
